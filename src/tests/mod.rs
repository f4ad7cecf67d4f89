#[cfg(test)]
mod module_tests;
