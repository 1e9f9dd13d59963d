mod test_curve_basic;
mod test_listeners_basic;
