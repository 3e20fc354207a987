/// Implements `From<T>` in both directions for a newtype over a primitive.
#[macro_export]
macro_rules! impl_from_primitive {
    ($wrapper:ident, $primitive:ty) => {
        impl From<$primitive> for $wrapper {
            fn from(value: $primitive) -> Self {
                Self(value)
            }
        }

        impl From<$wrapper> for $primitive {
            fn from(wrapper: $wrapper) -> Self {
                wrapper.0
            }
        }
    };
}

/// Implements offset arithmetic for an ordinal newtype: shifting by a primitive
/// amount, and the distance between two values as a primitive.
#[macro_export]
macro_rules! impl_shift_primitive {
    ($wrapper:ident, $primitive:ty) => {
        impl std::ops::Add<$primitive> for $wrapper {
            type Output = Self;

            fn add(self, rhs: $primitive) -> Self::Output {
                Self(self.0 + rhs)
            }
        }

        impl std::ops::AddAssign<$primitive> for $wrapper {
            fn add_assign(&mut self, rhs: $primitive) {
                self.0 += rhs;
            }
        }

        impl std::ops::Sub<$primitive> for $wrapper {
            type Output = Self;

            fn sub(self, rhs: $primitive) -> Self::Output {
                Self(self.0 - rhs)
            }
        }

        impl std::ops::Sub for $wrapper {
            type Output = $primitive;

            fn sub(self, other: Self) -> Self::Output {
                self.0 - other.0
            }
        }
    };
}
