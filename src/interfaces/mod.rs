//! Interface (port) definitions implemented by infrastructure adapters.

pub mod external_services;
