//! The one big-endian encode/decode primitive per scalar width.

mod sealed {
    pub trait Sealed {}
}

/// A fixed-width scalar with a big-endian wire representation.
///
/// Implemented for the scalar types the buffer can carry. All multi-byte
/// widths encode via `to_be_bytes`/`from_be_bytes`, so call sites never
/// branch on host endianness.
pub trait WireScalar: Copy + PartialEq + sealed::Sealed {
    /// Width of the wire representation in bytes.
    const WIDTH: usize;
    /// The zero value of the type, treated as the end-of-data sentinel by
    /// linear scans.
    const ZERO: Self;

    /// Decode from the first `Self::WIDTH` bytes of `src`.
    fn read_be(src: &[u8]) -> Self;

    /// Encode into the first `Self::WIDTH` bytes of `dst`.
    fn write_be(self, dst: &mut [u8]);
}

macro_rules! impl_wire_scalar {
    ($($ty:ty),* $(,)?) => {$(
        impl sealed::Sealed for $ty {}

        impl WireScalar for $ty {
            const WIDTH: usize = std::mem::size_of::<$ty>();
            const ZERO: Self = 0 as $ty;

            fn read_be(src: &[u8]) -> Self {
                let mut raw = [0u8; std::mem::size_of::<$ty>()];
                raw.copy_from_slice(&src[..Self::WIDTH]);
                <$ty>::from_be_bytes(raw)
            }

            fn write_be(self, dst: &mut [u8]) {
                dst[..Self::WIDTH].copy_from_slice(&self.to_be_bytes());
            }
        }
    )*};
}

impl_wire_scalar!(u8, i8, u16, u32, u64, f32, f64);
