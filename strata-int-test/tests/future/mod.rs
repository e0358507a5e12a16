mod future_test;
