use crate::dtype::DType;
use half::{bf16, f16};
use std::ops::{Add, Div, Mul, Neg, Sub};

macro_rules! numeric_variants {
    ($($variant:ident => $type:ty),* $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub enum Scalar {
            $($variant($type),)*
        }

        impl Scalar {
            #[inline]
            pub fn new<T: Into<Self>>(value: T) -> Self {
                value.into()
            }

            #[inline]
            pub fn dtype(&self) -> DType {
                match self {
                    $(Self::$variant(_) => DType::$variant,)*
                }
            }

            #[inline]
            pub fn as_f64_any(&self) -> f64 {
                match *self {
                    $(
                        Self::$variant(x) => {
                            numeric_variants!(@as_f64 $variant, x)
                        },
                    )*
                }
            }

            $(
                paste::paste! {
                    #[inline]
                    pub fn [<as_ $variant:lower>](&self) -> $type {
                        match *self {
                            Self::$variant(x) => x,
                            _ => numeric_variants!(@convert $variant => self.as_f64_any()),
                        }
                    }
                }
            )*
        }

        $(
            impl From<$type> for Scalar {
                #[inline]
                fn from(x: $type) -> Self {
                    Self::$variant(x)
                }
            }
        )*

        impl Add for Scalar {
            type Output = Self;

            #[inline]
            fn add(self, rhs: Self) -> Self::Output {
                match (self, rhs) {
                    $(
                        (Self::$variant(a), Self::$variant(b)) => Self::$variant(a + b),
                    )*
                    (lhs, rhs) => Self::F64(lhs.as_f64_any() + rhs.as_f64_any()),
                }
            }
        }

        impl Sub for Scalar {
            type Output = Self;

            #[inline]
            fn sub(self, rhs: Self) -> Self::Output {
                match (self, rhs) {
                    $(
                        (Self::$variant(a), Self::$variant(b)) => Self::$variant(a - b),
                    )*
                    (lhs, rhs) => Self::F64(lhs.as_f64_any() - rhs.as_f64_any()),
                }
            }
        }

        impl Mul for Scalar {
            type Output = Self;

            #[inline]
            fn mul(self, rhs: Self) -> Self::Output {
                match (self, rhs) {
                    $(
                        (Self::$variant(a), Self::$variant(b)) => Self::$variant(a * b),
                    )*
                    (lhs, rhs) => Self::F64(lhs.as_f64_any() * rhs.as_f64_any()),
                }
            }
        }

        impl Div for Scalar {
            type Output = Self;

            #[inline]
            fn div(self, rhs: Self) -> Self::Output {
                match (self, rhs) {
                    $(
                        (Self::$variant(a), Self::$variant(b)) => Self::$variant(a / b),
                    )*
                    (lhs, rhs) => Self::F64(lhs.as_f64_any() / rhs.as_f64_any()),
                }
            }
        }

        impl Neg for Scalar {
            type Output = Self;

            #[inline]
            fn neg(self) -> Self::Output {
                match self {
                    $(
                        Self::$variant(a) => Self::$variant(-a),
                    )*
                }
            }
        }
    };

    (@as_f64 BF16, $x:ident) => {
        f32::from($x) as f64
    };
    (@as_f64 F16, $x:ident) => {
        f32::from($x) as f64
    };
    (@as_f64 F32, $x:ident) => {
        $x as f64
    };
    (@as_f64 F64, $x:ident) => {
        $x
    };

    (@convert BF16 => $val:expr) => {
        bf16::from_f32($val as f32)
    };
    (@convert F16 => $val:expr) => {
        f16::from_f32($val as f32)
    };
    (@convert F32 => $val:expr) => {
        $val as f32
    };
    (@convert F64 => $val:expr) => {
        $val
    };
}

numeric_variants! {
    BF16 => bf16,
    F16  => f16,
    F32  => f32,
    F64  => f64,
}

impl From<i32> for Scalar {
    #[inline]
    fn from(x: i32) -> Self {
        Scalar::F64(x as f64)
    }
}

impl From<i64> for Scalar {
    #[inline]
    fn from(x: i64) -> Self {
        Scalar::F64(x as f64)
    }
}

impl From<usize> for Scalar {
    #[inline]
    fn from(x: usize) -> Self {
        Scalar::F64(x as f64)
    }
}

impl From<isize> for Scalar {
    #[inline]
    fn from(x: isize) -> Self {
        Scalar::F64(x as f64)
    }
}
