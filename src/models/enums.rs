use serde::{Deserialize, Serialize};

use super::ModelError;

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ModelError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

// Section that contributed an identity number to the registry.
str_enum!(Origin {
    Global => "GLOBAL",
    Form => "FORMULARIO",
    Sintys => "SINTYS",
    Intercajas => "INTERCAJAS",
    Anses => "ANSES",
    Negative => "NEGATIVA",
});

str_enum!(Section {
    Cover => "caratula",
    IntakeForm => "formulario",
    Renaper => "renaper",
    Sintys => "sintys",
    Intercajas => "intercajas",
    Anses => "anses",
    NegativeCertification => "certneg",
});

impl Section {
    pub const ALL: [Section; 7] = [
        Section::Cover,
        Section::IntakeForm,
        Section::Renaper,
        Section::Sintys,
        Section::Intercajas,
        Section::Anses,
        Section::NegativeCertification,
    ];

    /// Human label used in logs and reports.
    pub fn label(&self) -> &'static str {
        match self {
            Section::Cover => "Carátula",
            Section::IntakeForm => "Formulario de Inicio",
            Section::Renaper => "Renaper",
            Section::Sintys => "SINTyS",
            Section::Intercajas => "Intercajas",
            Section::Anses => "ANSES",
            Section::NegativeCertification => "Cert. Negativa",
        }
    }
}
