mod pipeline_tests;
mod profile_tests;
