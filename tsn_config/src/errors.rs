use thiserror::Error;

/// A magnitude string that does not match the grammar for the unit
/// family the caller asked for. Always carries the offending input so
/// the CLI can tell the user exactly what to fix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Not a valid time (expected `<digits>[ns|us|µs|ms]`).
    #[error("'{0}' is not a valid time")]
    Time(String),

    /// Not a valid bit-rate (expected `<digits><k|M|G|ki|Mi|Gi><b|B>ps`).
    #[error("'{0}' is not a valid bit-rate")]
    Rate(String),

    /// Not a valid size (expected `<digits><k|M|G|ki|Mi|Gi><b|B>`).
    #[error("'{0}' is not a valid size")]
    Size(String),
}

/// Everything that can go wrong between reading a configuration file
/// and producing compiled interface descriptors. Compilation is
/// all-or-nothing: the first error fails the whole document.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A magnitude string failed to normalize.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A required key is absent. The path names the missing leaf,
    /// e.g. `nics.eth1.tas.txtime_delay`.
    #[error("missing required key: {path}")]
    MissingKey {
        /// Dotted path of the absent key.
        path: String,
    },

    /// An interface declared both `cbs` and `tas` sections.
    #[error("interface {0}: cbs and tas cannot be combined")]
    ModeConflict(String),

    /// A priority was assigned to more than one shaping class.
    #[error("priority {0} is assigned to more than one traffic class")]
    DuplicatePriority(u8),

    /// A priority value outside the 0-15 range supported by the
    /// priority-to-class map.
    #[error("priority {0} is outside the supported 0-15 range")]
    PriorityOutOfRange(i64),

    /// More traffic classes requested than the 16 queues `mqprio` and
    /// `taprio` can address.
    #[error("configuration requires {0} traffic classes, only 16 are addressable")]
    TooManyClasses(usize),

    /// Class A alone reserves the entire link; the class B credit
    /// formula has no headroom to work with.
    #[error(
        "interface {ifname}: class A reserves {idleslope} bit/s of a {linkspeed} bit/s link"
    )]
    Oversubscribed {
        /// Interface being compiled.
        ifname: String,
        /// Sum of class A stream bandwidths, bits/sec.
        idleslope: i64,
        /// Resolved link speed, bits/sec.
        linkspeed: i64,
    },

    /// The configuration file could not be read.
    #[error("unable to read {path}: {source}")]
    Io {
        /// Path that failed to open.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not well-formed YAML (or does not
    /// match the document shape).
    #[error("unable to parse configuration: {0}")]
    Document(#[from] serde_yaml::Error),
}

impl ConfigError {
    /// Convenience constructor for [`ConfigError::MissingKey`].
    pub fn missing_key<S: ToString>(path: S) -> Self {
        Self::MissingKey {
            path: path.to_string(),
        }
    }
}
