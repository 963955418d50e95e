pub mod checkout;
pub mod discounts;
pub mod orders;
pub mod payments;
