mod collection_test;
mod concurrency_test;
