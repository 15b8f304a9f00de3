pub mod payment;

pub use payment::{payment_gate_layer, PaymentCredential, PaymentGate};
