mod visreg_test;
