//! Structural comparison of ordered port lists.

use crate::error::HarnessError;
use crate::resource::PortBinding;

/// Compare observed ports against an expectation, ignoring allocated node ports
///
/// Order matters. Two empty lists are equal without further inspection. On
/// mismatch the error carries the expectation and the observed list as read,
/// allocations included.
pub fn check_ports(observed: &[PortBinding], expected: &[PortBinding]) -> Result<(), HarnessError> {
    if observed.is_empty() && expected.is_empty() {
        return Ok(());
    }

    let normalised: Vec<PortBinding> = observed
        .iter()
        .map(PortBinding::without_allocation)
        .collect();
    let expected_normalised: Vec<PortBinding> = expected
        .iter()
        .map(PortBinding::without_allocation)
        .collect();

    if normalised == expected_normalised {
        Ok(())
    } else {
        Err(HarnessError::PortListMismatch {
            expected: expected.to_vec(),
            actual: observed.to_vec(),
        })
    }
}
