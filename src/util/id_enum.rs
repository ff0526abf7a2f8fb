/// Declares a closed, ordered identifier enum with string serialization.
///
/// Variant order is declaration order: `ALL` lists variants in that order and
/// the derived `Ord` follows it. Each variant has a serde name (used on disk
/// and on the command line) and a display name, plus optional aliases that
/// `from_name` also accepts.
#[macro_export]
macro_rules! define_id_enum {
    (
        $(#[$enum_meta:meta])*
        $enum_name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident => $serde_name:literal : $display_name:literal
                $( | $alias:literal )*
            ),* $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $enum_name {
            $(
                $(#[$variant_meta])*
                $variant,
            )*
        }

        impl serde::Serialize for $enum_name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $enum_name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Self::from_name(&s).ok_or_else(|| {
                    serde::de::Error::unknown_variant(&s, &[$($serde_name),*])
                })
            }
        }

        impl $enum_name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),*];

            /// Stable machine name, used for serialization and file names
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $serde_name,)*
                }
            }

            /// Human-readable name
            pub fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant => $display_name,)*
                }
            }

            pub fn from_name(name: &str) -> Option<Self> {
                let lowered = name.trim().to_lowercase();
                $(
                    if lowered == $serde_name
                        || lowered == $display_name.to_lowercase()
                        $(|| lowered == $alias)*
                    {
                        return Some(Self::$variant);
                    }
                )*
                None
            }

            pub fn index(&self) -> usize {
                Self::ALL.iter().position(|v| v == self).unwrap_or(0)
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

#[cfg(test)]
mod tests {
    crate::define_id_enum! {
        Fruit {
            Apple => "apple" : "Apple",
            BloodOrange => "blood_orange" : "Blood Orange" | "orange",
        }
    }

    #[test]
    fn test_serialization_uses_machine_name() {
        assert_eq!(
            serde_json::to_string(&Fruit::BloodOrange).unwrap(),
            "\"blood_orange\""
        );
    }

    #[test]
    fn test_deserialization_rejects_unknown() {
        let parsed: Result<Fruit, _> = serde_json::from_str("\"kiwi\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_from_name_accepts_display_and_alias() {
        assert_eq!(Fruit::from_name("Blood Orange"), Some(Fruit::BloodOrange));
        assert_eq!(Fruit::from_name("ORANGE"), Some(Fruit::BloodOrange));
        assert_eq!(Fruit::from_name("apple"), Some(Fruit::Apple));
    }

    #[test]
    fn test_order_follows_declaration() {
        assert!(Fruit::Apple < Fruit::BloodOrange);
        assert_eq!(Fruit::BloodOrange.index(), 1);
        assert_eq!(Fruit::ALL.len(), 2);
    }
}
