use thiserror::Error;

/// Fatal decode faults raised by the virtual machine.
///
/// A word whose selector or function code falls in a reserved range must
/// never execute; the step that fetched it fails and is not retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Fault {
    /// Selector in the unassigned range `11..=15`.
    #[error("reserved selector {0} in instruction word")]
    ReservedSelector(u8),
    /// Comparison function code 2, 6 or 7.
    #[error("reserved comparison function code {0}")]
    ReservedFunction(u8),
    /// `NOT` encoding with a nonzero `breg` field.
    #[error("NOT instruction carries a nonzero breg field")]
    UnusedFieldNotZero,
}

#[cfg(test)]
mod tests {
    use super::Fault;

    #[test]
    fn fault_messages_name_the_offending_field() {
        assert_eq!(
            Fault::ReservedSelector(12).to_string(),
            "reserved selector 12 in instruction word"
        );
        assert_eq!(
            Fault::ReservedFunction(6).to_string(),
            "reserved comparison function code 6"
        );
    }
}
