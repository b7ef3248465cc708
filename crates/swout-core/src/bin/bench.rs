//! Pure Rust benchmarks of the output engine.
//!
//! Uses std::time::Instant for timing, a deterministic LCG PRNG for data generation,
//! and std::hint::black_box to prevent dead-code elimination.

use std::hint::black_box;
use std::io::sink;
use std::time::{Duration, Instant};

use swout_core::constants::N_PERIODS;
use swout_core::sinks::{FileFamily, TextSink};
use swout_core::{
    DailyState, ModelClock, OutPeriod, OutputEngine, OutputRun, OutputSetup, SimulationSpan,
    Site, SoilLayer,
};

const REPEATS: usize = 7;
const N_LAYERS: usize = 8;

const SETUP: &str = "\
TIMESTEP DY WK MO YR
TEMP        AVG DY 1 END temp
PRECIP      SUM DY 1 END precip
VWCBULK     FIN DY 1 END vwcbulk
SWPMATRIC   FIN DY 1 END swpmatric
TRANSP      SUM DY 1 END transp
AET         SUM DY 1 END aet
SOILTEMP    AVG DY 1 END soiltemp
BIOMASS     AVG DY 1 END biomass
";

/// Simple LCG PRNG for deterministic data generation.
fn make_days(n: usize, seed: u64) -> Vec<DailyState> {
    let mut state = seed;
    let mut next_f64 = || -> f64 {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 33) as f64 / (1u64 << 31) as f64
    };

    (0..n)
        .map(|_| {
            let mut d = DailyState::new(0);
            d.weather.temp_avg = -10.0 + next_f64() * 30.0;
            d.weather.ppt = next_f64() * 10.0;
            for lyr in 0..N_LAYERS {
                d.soil.swc_today[lyr] = 1.0 + next_f64() * 4.0;
                d.soil.soil_temp_avg[lyr] = next_f64() * 20.0;
                for v in 0..d.soil.transpiration.len() {
                    d.soil.transpiration[v][lyr] = next_f64() * 0.1;
                }
            }
            d.soil.aet = next_f64() * 0.5;
            d
        })
        .collect()
}

/// Run a closure `REPEATS` times, return the median duration.
fn median_time<F: FnMut()>(mut f: F) -> Duration {
    let mut times: Vec<Duration> = (0..REPEATS)
        .map(|_| {
            let start = Instant::now();
            f();
            start.elapsed()
        })
        .collect();
    times.sort();
    times[REPEATS / 2]
}

fn site() -> Site {
    Site::uniform(N_LAYERS, SoilLayer::new(10.0, 0.1, 1.0, -3.0, 42.0, 6.0), 3)
        .expect("valid bench site")
}

fn simulate<W: std::io::Write>(engine: &mut OutputEngine<W>, span: SimulationSpan, days: &[DailyState]) {
    let mut clock = ModelClock::new(span);
    let mut day = days.iter().cycle();
    let mut today = DailyState::new(0);
    for year in span.start_year..=span.end_year {
        clock.new_year(year);
        engine.new_year(&clock);
        for doy in clock.days() {
            clock.new_day(doy);
            if let Some(d) = day.next() {
                today.clone_from(d);
            }
            engine.end_day(&clock, &today).expect("engine day");
            today.soil.end_day();
        }
        clock.end_year();
        engine.flush(&clock, &today).expect("engine flush");
    }
}

fn bench_arrays(years: &[u32]) -> Vec<(&'static str, u32, Duration)> {
    let (setup, _) = OutputSetup::parse(SETUP, false).expect("valid bench setup");
    let days = make_days(366, 42);
    let mut results = Vec::new();

    for &n in years {
        let span = SimulationSpan::years(1980, 1980 + n - 1).expect("valid span");
        let run = OutputRun::new(setup.clone(), site())
            .expect("valid run")
            .with_array_sink(&span)
            .with_grid_sink(&span, 12);

        // Warmup
        let mut engine: OutputEngine<std::io::Sink> = OutputEngine::new(run.clone());
        simulate(&mut engine, span, &days);
        black_box(&engine.run.sinks);

        let dur = median_time(|| {
            let mut engine: OutputEngine<std::io::Sink> = OutputEngine::new(run.clone());
            simulate(&mut engine, span, &days);
            black_box(&engine.run.sinks);
        });
        results.push(("array+grid", n, dur));
    }
    results
}

fn bench_text(years: &[u32]) -> Vec<(&'static str, u32, Duration)> {
    let (setup, _) = OutputSetup::parse(SETUP, false).expect("valid bench setup");
    let days = make_days(366, 7);
    let mut results = Vec::new();

    for &n in years {
        let span = SimulationSpan::years(1980, 1980 + n - 1).expect("valid span");
        let run = OutputRun::new(setup.clone(), site()).expect("valid run");

        let dur = median_time(|| {
            let mut writers: [[Option<std::io::Sink>; 2]; N_PERIODS] = Default::default();
            for p in OutPeriod::ALL {
                for fam in FileFamily::ALL {
                    writers[p.index()][fam.index()] = Some(sink());
                }
            }
            let text = TextSink::from_writers(writers, &run.setup, &run.registry)
                .expect("text sink");
            let mut engine = OutputEngine::new(run.clone()).with_text(text);
            simulate(&mut engine, span, &days);
        });
        results.push(("csv", n, dur));
    }
    results
}

fn main() {
    println!("Output Engine Benchmarks");
    println!("============================================================");
    println!("{:<18} {:>6}   {:>12}", "Sinks", "Years", "Median (ms)");
    println!("--------------------------------------------");

    let mut all_results: Vec<(&str, u32, Duration)> = Vec::new();

    all_results.extend(bench_arrays(&[1, 10, 30]));
    all_results.extend(bench_text(&[1, 10, 30]));

    for (sinks, n, dur) in &all_results {
        let ms = dur.as_secs_f64() * 1000.0;
        println!("{:<18} {:>6}      {:>8.2}", sinks, n, ms);
    }

    println!("============================================================");
}
