use swout_macros::Accumulator;

#[derive(Debug, Clone, Default, Accumulator)]
#[accumulator(label = "snow")]
pub struct SnowSums {
    pub snowpack: f64,
    pub snowdepth: f64,
}

fn main() {
    let mut s = SnowSums { snowpack: 1.5, snowdepth: 50.0 };
    s.reset();
    assert!(s.is_reset());
    assert_eq!(SnowSums::label(), "snow");
    assert_eq!(SnowSums::field_names(), &["snowpack", "snowdepth"]);
}
