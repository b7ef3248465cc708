use log::info;

use swout::{
    DailyState, ModelClock, OutKey, OutPeriod, OutputRun, OutputSetup, SimulationSpan, Site,
    SoilLayer,
};

const SETUP: &str = "\
TIMESTEP MO
PRECIP  SUM MO 1 END precip
TEMP    AVG MO 1 END temp
SWCBULK FIN MO 1 END swc
";

fn main() {
    env_logger::init();

    let (setup, diags) = OutputSetup::parse(SETUP, false).unwrap();
    for d in diags.entries() {
        info!("setup: {}", d.message);
    }
    let layer = SoilLayer::new(15.0, 0.1, 1.5, -3.0, 42.0, 6.0);
    let site = Site::uniform(2, layer, 1).unwrap();
    let span = SimulationSpan::years(2001, 2001).unwrap();
    let mut run = OutputRun::new(setup, site).unwrap().with_array_sink(&span);

    // A synthetic year: wet winters, warm summers, slowly draining soil.
    let mut clock = ModelClock::new(span);
    let mut daily = DailyState::new(0);
    run.new_year(&clock);
    for doy in clock.days() {
        clock.new_day(doy);
        let season = (2.0 * std::f64::consts::PI * (doy as f64 - 15.0) / 365.0).cos();
        daily.weather.ppt = (0.3 + 0.25 * season).max(0.0);
        daily.weather.temp_avg = 10.0 - 12.0 * season;
        daily.soil.swc_today[0] = 3.0 + 2.0 * season;
        daily.soil.swc_today[1] = 4.0 + season;
        run.end_day(&clock, &daily).unwrap();
        daily.soil.end_day();
    }
    clock.end_year();
    run.flush(&clock, &daily).unwrap();

    let array = run.sinks.array.as_ref().unwrap();
    let col = |key, row, c| array.get(key, OutPeriod::Month, row, c).unwrap_or(f64::NAN);

    println!("Month | PPT (cm) | Tavg (C) | SWC L1 | SWC L2");
    println!("------|----------|----------|--------|-------");
    for row in 0..array.rows_written(OutPeriod::Month) {
        println!(
            "  {:>2}  | {:>8.2} | {:>8.2} | {:>6.2} | {:>6.2}",
            col(OutKey::Precip, row, 1) as u32,
            col(OutKey::Precip, row, 2),
            col(OutKey::Temp, row, 4),
            col(OutKey::SWCBulk, row, 2),
            col(OutKey::SWCBulk, row, 3),
        );
    }

    let total: f64 = (0..12).map(|row| col(OutKey::Precip, row, 2)).sum();
    println!("\nTotal precipitation: {:.2} cm", total);
}
