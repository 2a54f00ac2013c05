macro_rules! id_wrapper {
    ($struct:ident) => {
        /// A stable identifier newtype
        #[derive(
            Debug,
            Hash,
            PartialEq,
            Eq,
            Clone,
            Copy,
            PartialOrd,
            Ord,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        #[repr(transparent)]
        pub struct $struct(u32);

        impl From<u32> for $struct {
            fn from(value: u32) -> Self {
                Self(value)
            }
        }

        impl From<$struct> for u32 {
            fn from(value: $struct) -> u32 {
                value.0
            }
        }

        impl std::fmt::Display for $struct {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

id_wrapper!(AgentId);

/// An explicit issuer of unique agent ids.
///
/// Scenario construction either supplies its own unique ids or threads one
/// of these through; there is deliberately no process-wide counter, so two
/// scenarios built side by side can never entangle their id spaces.
#[derive(Debug, Default)]
pub struct AgentIdSource(u32);

impl AgentIdSource {
    /// Creates a source that issues ids starting at 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues the next unused id.
    pub fn next_id(&mut self) -> AgentId {
        self.0 += 1;
        AgentId(self.0)
    }
}
