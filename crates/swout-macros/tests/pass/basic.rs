use swout_macros::Accumulator;

#[derive(Debug, Clone, Default, Accumulator)]
pub struct TestSums {
    pub ppt: f64,
    pub rain: f64,
    pub snowmelt: f64,
}

fn main() {
    let mut s = TestSums { ppt: 1.0, rain: 2.0, snowmelt: 3.0 };
    assert!(!s.is_reset());
    s.reset();
    assert!(s.is_reset());
    assert_eq!(s.ppt, 0.0);
    assert_eq!(TestSums::field_names(), &["ppt", "rain", "snowmelt"]);
    assert_eq!(TestSums::n_slots(), 3);
    assert_eq!(TestSums::label(), "TestSums");
}
