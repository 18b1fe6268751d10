pub mod investments;

pub use investments::{Investment, InvestmentStore, NewInvestment};
