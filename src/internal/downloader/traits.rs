pub mod whole_fetch;
