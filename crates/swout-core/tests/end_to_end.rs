use std::fs;

use approx::assert_relative_eq;

use swout_core::constants::SW_MISSING;
use swout_core::sinks::TextSink;
use swout_core::{
    DailyState, ModelClock, OutKey, OutPeriod, OutputEngine, OutputRun, OutputSetup,
    SimulationSpan, Site, SoilLayer,
};

fn site(n_layers: usize) -> Site {
    Site::uniform(n_layers, SoilLayer::new(20.0, 0.0, 2.0, -3.0, 40.0, 5.0), 1).unwrap()
}

/// Drive `engine` through every year of `span`, filling each day with
/// `fill`.
fn simulate<W: std::io::Write>(
    engine: &mut OutputEngine<W>,
    span: SimulationSpan,
    mut fill: impl FnMut(&ModelClock, &mut DailyState),
) {
    let mut clock = ModelClock::new(span);
    let mut daily = DailyState::new(0);
    for year in span.start_year..=span.end_year {
        clock.new_year(year);
        engine.new_year(&clock);
        for doy in clock.days() {
            clock.new_day(doy);
            fill(&clock, &mut daily);
            engine.end_day(&clock, &daily).unwrap();
            daily.soil.end_day();
        }
        clock.end_year();
        engine.flush(&clock, &daily).unwrap();
    }
}

#[test]
fn monthly_precipitation_sum_reaches_csv_and_array() {
    let dir = tempfile::tempdir().unwrap();
    let (setup, diags) = OutputSetup::parse("PRECIP SUM MO 1 END precip\n", false).unwrap();
    assert!(diags.is_empty());

    let span = SimulationSpan::new(2001, 2001, 1, 31).unwrap();
    let run = OutputRun::new(setup, site(3)).unwrap().with_array_sink(&span);
    let text = TextSink::create(dir.path(), &run.setup, &run.registry).unwrap();
    let mut engine = OutputEngine::new(run).with_text(text);

    simulate(&mut engine, span, |_, daily| daily.weather.ppt = 1.0);

    let csv = fs::read_to_string(dir.path().join("sw2_monthly.csv")).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines[0],
        "Year,Month,PRECIP_ppt,PRECIP_rain,PRECIP_snow_fall,PRECIP_snowmelt,PRECIP_snowloss"
    );
    assert_eq!(lines[1], "2001,1,31.000000,0.000000,0.000000,0.000000,0.000000");
    assert_eq!(lines.len(), 2);
    assert!(!dir.path().join("sw2_monthly_slyrs.csv").exists());
    assert!(!dir.path().join("sw2_daily.csv").exists());

    let (run, _) = engine.into_parts();
    let array = run.sinks.array.as_ref().unwrap();
    assert_eq!(array.get(OutKey::Precip, OutPeriod::Month, 0, 0), Some(2001.0));
    assert_eq!(array.get(OutKey::Precip, OutPeriod::Month, 0, 1), Some(1.0));
    assert_relative_eq!(array.get(OutKey::Precip, OutPeriod::Month, 0, 2).unwrap(), 31.0);
}

#[test]
fn soil_layer_keys_go_to_the_layer_files() {
    let dir = tempfile::tempdir().unwrap();
    let setup_text = "\
# key   sum  period first last outfile
TIMESTEP YR
SWCBULK FIN  YR     1     END  swc
TEMP    AVG  YR     1     END  temp
";
    let (setup, _) = OutputSetup::parse(setup_text, false).unwrap();
    let span = SimulationSpan::years(2001, 2002).unwrap();
    let run = OutputRun::new(setup, site(2))
        .unwrap()
        .with_grid_sink(&span, 4);
    let text = TextSink::create(dir.path(), &run.setup, &run.registry).unwrap();
    let mut engine = OutputEngine::new(run).with_text(text);

    simulate(&mut engine, span, |clock, daily| {
        daily.weather.temp_avg = if clock.year == 2001 { 10.0 } else { 20.0 };
        daily.soil.swc_today[0] = clock.doy as f64 / 100.0;
        daily.soil.swc_today[1] = 1.5;
    });

    let soil = fs::read_to_string(dir.path().join("sw2_yearly_slyrs.csv")).unwrap();
    assert_eq!(
        soil.lines().collect::<Vec<_>>(),
        vec![
            "Year,SWCBULK_Lyr_1,SWCBULK_Lyr_2",
            "2001,3.650000,1.500000",
            "2002,3.650000,1.500000",
        ]
    );
    let regular = fs::read_to_string(dir.path().join("sw2_yearly.csv")).unwrap();
    let rows: Vec<&str> = regular.lines().collect();
    assert_eq!(rows.len(), 3);
    assert!(rows[0].starts_with("Year,TEMP_max_C,TEMP_min_C,TEMP_avg_C"));
    assert!(rows[2].starts_with("2002,0.000000,0.000000,20.000000"));

    let (run, _) = engine.into_parts();
    let grid = run.sinks.grid.as_ref().unwrap();
    assert_relative_eq!(grid.get(OutKey::SWCBulk, OutPeriod::Year, 0, 1, 0, 0).unwrap(), 3.65);
    assert_eq!(grid.get(OutKey::SWCBulk, OutPeriod::Year, 0, 1, 3, 0), Some(SW_MISSING));
    assert_eq!(grid.times(OutPeriod::Year).len(), 2);
}
