#[macro_export]
macro_rules! impl_proof_object_identifier {
    ($i:ident) => {
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize, Default,
        )]
        pub struct $i(pub String);

        impl $i {
            pub fn new_unchecked(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            pub fn new(s: impl Into<String>) -> Result<Self, $crate::error::ValidationError> {
                let s = Self(s.into());
                $crate::utils::validation::Validatable::validate(&s)?;
                Ok(s)
            }
        }

        impl $crate::utils::validation::Validatable for $i {
            fn validate(&self) -> Result<(), $crate::error::ValidationError> {
                if self.0.trim().is_empty() {
                    return Err($crate::error::ValidationError::EmptyIdentifier {
                        kind: stringify!($i),
                    });
                }
                Ok(())
            }
        }

        impl From<$i> for String {
            fn from(i: $i) -> Self {
                i.0
            }
        }

        impl TryFrom<String> for $i {
            type Error = $crate::error::ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                $i::new(value)
            }
        }

        impl TryFrom<&str> for $i {
            type Error = $crate::error::ValidationError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                $i::new(value.to_owned())
            }
        }

        impl std::fmt::Display for $i {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}
