//! Operator authorization for trade reports and period changes

use accrual_core::prelude::*;
use serde::{Deserialize, Serialize};

/// Privileged-caller gate
pub trait OperatorGate {
    fn is_authorized(&self, caller: &Address) -> bool;

    /// Hand the operator role to another address
    fn transfer(&mut self, caller: &Address, new_operator: Address) -> Result<()>;

    fn ensure_authorized(&self, caller: &Address) -> Result<()> {
        if self.is_authorized(caller) {
            Ok(())
        } else {
            tracing::warn!("Rejected privileged call from {}", caller);
            Err(AccrualError::Unauthorized { caller: *caller })
        }
    }
}

/// Single designated operator (the exchange venue)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ownership {
    operator: Address,
}

impl Ownership {
    pub fn new(operator: Address) -> Self {
        Self { operator }
    }

    pub fn operator(&self) -> Address {
        self.operator
    }
}

impl OperatorGate for Ownership {
    fn is_authorized(&self, caller: &Address) -> bool {
        *caller == self.operator
    }

    fn transfer(&mut self, caller: &Address, new_operator: Address) -> Result<()> {
        self.ensure_authorized(caller)?;
        if new_operator == Address::ZERO {
            return Err(AccrualError::invalid("operator cannot be the zero address"));
        }
        tracing::info!("Operator role moved from {} to {}", self.operator, new_operator);
        self.operator = new_operator;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_operator_is_authorized() {
        let exchange = Address::from_label("exchange");
        let gate = Ownership::new(exchange);
        assert!(gate.is_authorized(&exchange));
        assert!(gate.ensure_authorized(&Address::from_label("mallory")).is_err());
    }

    #[test]
    fn test_transfer() {
        let exchange = Address::from_label("exchange");
        let next = Address::from_label("exchange-v2");
        let mut gate = Ownership::new(exchange);

        assert_eq!(
            gate.transfer(&next, next),
            Err(AccrualError::Unauthorized { caller: next })
        );
        assert!(gate.transfer(&exchange, Address::ZERO).is_err());

        gate.transfer(&exchange, next).unwrap();
        assert_eq!(gate.operator(), next);
        assert!(!gate.is_authorized(&exchange));
    }
}
