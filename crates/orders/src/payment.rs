use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use commerce_core::{Entity, PaymentId};

use crate::money::Money;
use crate::status::PaymentStatus;
use crate::values::PaymentMethod;

/// Entity: a payment settled against an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPayment {
    id: PaymentId,
    method: PaymentMethod,
    amount: Money,
    status: PaymentStatus,
    paid_at: DateTime<Utc>,
}

impl OrderPayment {
    pub(crate) fn completed(
        id: PaymentId,
        method: PaymentMethod,
        amount: Money,
        paid_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            method,
            amount,
            status: PaymentStatus::Completed,
            paid_at,
        }
    }

    pub fn method(&self) -> PaymentMethod {
        self.method
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn status(&self) -> PaymentStatus {
        self.status
    }

    pub fn paid_at(&self) -> DateTime<Utc> {
        self.paid_at
    }
}

impl Entity for OrderPayment {
    type Id = PaymentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
