pub mod constants;
pub mod policy;
#[cfg(test)]
pub mod test_helpers;
pub mod types;
pub mod validation;
