mod plugin_test;
