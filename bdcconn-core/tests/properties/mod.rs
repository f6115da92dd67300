mod profile_tests;
mod registry_tests;
