//! Build environment and the policies it selects.
//!
//! The environment is resolved once per invocation and passed explicitly
//! through every transform. Two independent policy axes hang off it:
//!
//! | Environment   | Template mode | Directive policy |
//! |---------------|---------------|------------------|
//! | `development` | `Runtime`     | `Keep`           |
//! | `test`        | `Runtime`     | `Keep`           |
//! | `production`  | `Precompiled` | `Strip`          |

use std::fmt;
use std::str::FromStr;

use crate::config::ConfigError;

/// Build environment for one compile invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BuildEnvironment {
    #[default]
    Development,
    Test,
    Production,
}

impl BuildEnvironment {
    pub const ALL: [Self; 3] = [Self::Development, Self::Test, Self::Production];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Test => "test",
            Self::Production => "production",
        }
    }

    /// Template compilation mode for this environment.
    pub const fn template_mode(self) -> TemplateMode {
        match self {
            Self::Production => TemplateMode::Precompiled,
            Self::Development | Self::Test => TemplateMode::Runtime,
        }
    }

    /// Debug-directive policy for this environment.
    pub const fn directive_policy(self) -> DirectivePolicy {
        match self {
            Self::Production => DirectivePolicy::Strip,
            Self::Development | Self::Test => DirectivePolicy::Keep,
        }
    }
}

impl fmt::Display for BuildEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildEnvironment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "test" => Ok(Self::Test),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(ConfigError::InvalidEnvironment(s.to_string())),
        }
    }
}

/// How standalone template files (and inline compile calls) are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateMode {
    /// Template source is embedded verbatim and parsed when first rendered.
    Runtime,
    /// Template is parsed at build time into an executable representation.
    Precompiled,
}

impl TemplateMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Runtime => "runtime",
            Self::Precompiled => "precompiled",
        }
    }
}

/// What happens to `assert`/`warn`/`deprecate`/`debug` calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectivePolicy {
    Keep,
    Strip,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_environment() {
        assert_eq!(
            "development".parse::<BuildEnvironment>().unwrap(),
            BuildEnvironment::Development
        );
        assert_eq!(
            "TEST".parse::<BuildEnvironment>().unwrap(),
            BuildEnvironment::Test
        );
        assert_eq!(
            " prod ".parse::<BuildEnvironment>().unwrap(),
            BuildEnvironment::Production
        );
    }

    #[test]
    fn test_parse_invalid_environment() {
        let err = "staging".parse::<BuildEnvironment>().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvironment(ref v) if v == "staging"));
        assert!(err.to_string().contains("staging"));
    }

    #[test]
    fn test_policies() {
        use BuildEnvironment::*;
        assert_eq!(Development.template_mode(), TemplateMode::Runtime);
        assert_eq!(Test.template_mode(), TemplateMode::Runtime);
        assert_eq!(Production.template_mode(), TemplateMode::Precompiled);

        assert_eq!(Development.directive_policy(), DirectivePolicy::Keep);
        assert_eq!(Test.directive_policy(), DirectivePolicy::Keep);
        assert_eq!(Production.directive_policy(), DirectivePolicy::Strip);
    }

    #[test]
    fn test_display_roundtrips_through_parse() {
        for env in BuildEnvironment::ALL {
            assert_eq!(env.to_string().parse::<BuildEnvironment>().unwrap(), env);
        }
    }
}
