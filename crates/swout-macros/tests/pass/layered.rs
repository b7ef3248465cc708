use swout_macros::Accumulator;

#[derive(Debug, Clone, Default, Accumulator)]
pub struct LayerSums {
    pub total: f64,
    pub swc: [f64; 5],
    pub transp: [[f64; 5]; 4],
}

fn main() {
    let mut s = LayerSums::default();
    assert!(s.is_reset());
    s.swc[4] = 0.25;
    s.transp[3][2] = 1.0;
    assert!(!s.is_reset());
    s.reset();
    assert!(s.is_reset());
    assert_eq!(LayerSums::n_slots(), 1 + 5 + 20);
    assert_eq!(LayerSums::field_names(), &["total", "swc", "transp"]);
}
