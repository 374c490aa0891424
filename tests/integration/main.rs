// Integration tests

mod catalog_test;
mod routes_test;
