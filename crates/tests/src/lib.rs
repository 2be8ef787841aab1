pub mod fixtures;

#[cfg(test)]
mod deal_tests;
