use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use clap::Parser;
use log::info;
use parquet::arrow::ArrowWriter;

/// Column order of the public registration export.
const COLUMNS: [&str; 17] = [
    "VIN (1-10)",
    "County",
    "City",
    "State",
    "Postal Code",
    "Model Year",
    "Make",
    "Model",
    "Electric Vehicle Type",
    "Clean Alternative Fuel Vehicle (CAFV) Eligibility",
    "Electric Range",
    "Base MSRP",
    "Legislative District",
    "DOL Vehicle ID",
    "Vehicle Location",
    "Electric Utility",
    "2020 Census Tract",
];

/// (county, weight, [(city, postal code)], utility)
const COUNTIES: &[(&str, u32, &[(&str, u32)], &str)] = &[
    ("King", 50, &[("Seattle", 98101), ("Bellevue", 98004), ("Redmond", 98052), ("Kirkland", 98033)], "CITY OF SEATTLE - (WA)|CITY OF TACOMA - (WA)"),
    ("Snohomish", 12, &[("Everett", 98201), ("Bothell", 98012)], "PUGET SOUND ENERGY INC"),
    ("Pierce", 9, &[("Tacoma", 98402), ("Puyallup", 98371)], "BONNEVILLE POWER ADMINISTRATION||CITY OF TACOMA - (WA)"),
    ("Clark", 7, &[("Vancouver", 98661), ("Camas", 98607)], "BONNEVILLE POWER ADMINISTRATION||PUD NO 1 OF CLARK COUNTY - (WA)"),
    ("Thurston", 4, &[("Olympia", 98501), ("Lacey", 98503)], "PUGET SOUND ENERGY INC"),
    ("Kitsap", 4, &[("Bremerton", 98310), ("Poulsbo", 98370)], "PUGET SOUND ENERGY INC"),
    ("Spokane", 3, &[("Spokane", 99201)], "MODERN ELECTRIC WATER COMPANY"),
    ("Whatcom", 3, &[("Bellingham", 98225)], "PUGET SOUND ENERGY INC"),
    ("Benton", 2, &[("Kennewick", 99336), ("Richland", 99352)], "BONNEVILLE POWER ADMINISTRATION||PUD NO 1 OF BENTON COUNTY"),
    ("Yakima", 1, &[("Yakima", 98901)], "PACIFICORP"),
];

/// (make, model, vehicle type, electric range, weight)
const MODELS: &[(&str, &str, &str, i64, u32)] = &[
    ("TESLA", "MODEL Y", "Battery Electric Vehicle (BEV)", 0, 30),
    ("TESLA", "MODEL 3", "Battery Electric Vehicle (BEV)", 220, 25),
    ("TESLA", "MODEL S", "Battery Electric Vehicle (BEV)", 265, 5),
    ("TESLA", "MODEL X", "Battery Electric Vehicle (BEV)", 238, 4),
    ("NISSAN", "LEAF", "Battery Electric Vehicle (BEV)", 84, 10),
    ("CHEVROLET", "BOLT EV", "Battery Electric Vehicle (BEV)", 259, 7),
    ("CHEVROLET", "VOLT", "Plug-in Hybrid Electric Vehicle (PHEV)", 53, 4),
    ("FORD", "MUSTANG MACH-E", "Battery Electric Vehicle (BEV)", 0, 4),
    ("FORD", "FUSION", "Plug-in Hybrid Electric Vehicle (PHEV)", 21, 2),
    ("KIA", "NIRO", "Plug-in Hybrid Electric Vehicle (PHEV)", 26, 3),
    ("KIA", "EV6", "Battery Electric Vehicle (BEV)", 0, 3),
    ("TOYOTA", "RAV4 PRIME", "Plug-in Hybrid Electric Vehicle (PHEV)", 42, 4),
    ("TOYOTA", "PRIUS PRIME", "Plug-in Hybrid Electric Vehicle (PHEV)", 25, 2),
    ("BMW", "X5", "Plug-in Hybrid Electric Vehicle (PHEV)", 30, 2),
    ("BMW", "I3", "Battery Electric Vehicle (BEV)", 153, 1),
    ("VOLKSWAGEN", "ID.4", "Battery Electric Vehicle (BEV)", 0, 3),
    ("HYUNDAI", "IONIQ 5", "Battery Electric Vehicle (BEV)", 0, 3),
    ("JEEP", "WRANGLER", "Plug-in Hybrid Electric Vehicle (PHEV)", 21, 2),
    ("RIVIAN", "R1S", "Battery Electric Vehicle (BEV)", 0, 1),
    ("AUDI", "E-TRON", "Battery Electric Vehicle (BEV)", 204, 1),
    ("VOLVO", "XC90", "Plug-in Hybrid Electric Vehicle (PHEV)", 18, 1),
    ("POLESTAR", "PS2", "Battery Electric Vehicle (BEV)", 0, 1),
];

const FIRST_YEAR: i64 = 2011;
const LAST_YEAR: i64 = 2024;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n.max(1)
    }

    /// Index into `weights`, proportional to weight.
    fn weighted(&mut self, weights: impl Iterator<Item = u32> + Clone) -> usize {
        let total: u64 = weights.clone().map(u64::from).sum();
        let mut pick = self.below(total);
        for (i, w) in weights.enumerate() {
            let w = u64::from(w);
            if pick < w {
                return i;
            }
            pick -= w;
        }
        0
    }

    /// True with probability `p`.
    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

/// One generated registration.
struct Row {
    vin: String,
    county: String,
    city: String,
    postal_code: f64,
    model_year: i64,
    make: String,
    model: String,
    vehicle_type: String,
    cafv: String,
    electric_range: i64,
    legislative_district: Option<i64>,
    dol_id: i64,
    location: Option<String>,
    utility: Option<String>,
    census_tract: i64,
}

fn generate_rows(n: usize, rng: &mut SimpleRng) -> Vec<Row> {
    // Registrations grow roughly quadratically with model year.
    let year_weights = (FIRST_YEAR..=LAST_YEAR).map(|y| {
        let age = (y - FIRST_YEAR + 1) as u32;
        age * age
    });

    (0..n)
        .map(|i| {
            let (county, _, cities, utility) =
                COUNTIES[rng.weighted(COUNTIES.iter().map(|c| c.1))];
            let (city, postal) = cities[rng.below(cities.len() as u64) as usize];
            let (make, model, vehicle_type, range, _) =
                MODELS[rng.weighted(MODELS.iter().map(|m| m.4))];
            let model_year = FIRST_YEAR + rng.weighted(year_weights.clone()) as i64;

            let cafv = if range >= 30 {
                "Clean Alternative Fuel Vehicle Eligible"
            } else if range == 0 {
                "Eligibility unknown as battery range has not been researched"
            } else {
                "Not eligible due to low battery range"
            };

            Row {
                vin: format!("{:010X}", rng.next_u64() & 0xFF_FFFF_FFFF),
                county: county.to_string(),
                city: city.to_string(),
                postal_code: f64::from(postal),
                model_year,
                make: make.to_string(),
                model: model.to_string(),
                vehicle_type: vehicle_type.to_string(),
                cafv: cafv.to_string(),
                electric_range: range,
                legislative_district: (!rng.chance(0.02)).then(|| 1 + rng.below(49) as i64),
                dol_id: 100_000_000 + i as i64,
                location: (!rng.chance(0.01)).then(|| {
                    let lon = -124.0 + rng.next_f64() * 7.0;
                    let lat = 45.6 + rng.next_f64() * 3.3;
                    format!("POINT ({lon:.5} {lat:.5})")
                }),
                // A small share of rows lack a utility and are dropped on load.
                utility: (!rng.chance(0.005)).then(|| utility.to_string()),
                census_tract: 53_000_000_000 + rng.below(80_000_000) as i64,
            }
        })
        .collect()
}

fn write_csv(path: &Path, rows: &[Row]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(COLUMNS)?;
    for r in rows {
        writer.write_record([
            r.vin.clone(),
            r.county.clone(),
            r.city.clone(),
            "WA".to_string(),
            // Float rendering, as a Pandas export writes it.
            format!("{:.1}", r.postal_code),
            r.model_year.to_string(),
            r.make.clone(),
            r.model.clone(),
            r.vehicle_type.clone(),
            r.cafv.clone(),
            r.electric_range.to_string(),
            "0".to_string(),
            r.legislative_district.map(|d| d.to_string()).unwrap_or_default(),
            r.dol_id.to_string(),
            r.location.clone().unwrap_or_default(),
            r.utility.clone().unwrap_or_default(),
            r.census_tract.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &Path, rows: &[Row]) -> Result<()> {
    let text = |f: fn(&Row) -> &str| -> ArrayRef {
        Arc::new(StringArray::from(rows.iter().map(f).collect::<Vec<_>>()))
    };
    let int = |f: fn(&Row) -> i64| -> ArrayRef {
        Arc::new(Int64Array::from(rows.iter().map(f).collect::<Vec<_>>()))
    };

    let columns: Vec<ArrayRef> = vec![
        text(|r| &r.vin),
        text(|r| &r.county),
        text(|r| &r.city),
        text(|_| "WA"),
        Arc::new(Float64Array::from(rows.iter().map(|r| r.postal_code).collect::<Vec<_>>())),
        int(|r| r.model_year),
        text(|r| &r.make),
        text(|r| &r.model),
        text(|r| &r.vehicle_type),
        text(|r| &r.cafv),
        int(|r| r.electric_range),
        int(|_| 0),
        Arc::new(Int64Array::from(
            rows.iter().map(|r| r.legislative_district).collect::<Vec<_>>(),
        )),
        int(|r| r.dol_id),
        Arc::new(StringArray::from(
            rows.iter().map(|r| r.location.as_deref()).collect::<Vec<_>>(),
        )),
        Arc::new(StringArray::from(
            rows.iter().map(|r| r.utility.as_deref()).collect::<Vec<_>>(),
        )),
        int(|r| r.census_tract),
    ];

    let fields: Vec<Field> = COLUMNS
        .iter()
        .zip(&columns)
        .map(|(name, col)| Field::new(*name, col.data_type().clone(), true))
        .collect();
    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing record batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

#[derive(Parser, Debug)]
#[clap(name = "generate_sample", about = "Write a synthetic EV registration dataset")]
struct Args {
    /// Output file, `.csv` or `.parquet`.
    #[clap(default_value = "sample_registrations.csv")]
    output: PathBuf,

    /// Number of registrations to generate.
    #[clap(default_value_t = 5000)]
    rows: usize,

    /// PRNG seed.
    #[clap(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut rng = SimpleRng::new(args.seed);
    let rows = generate_rows(args.rows, &mut rng);

    let ext = args
        .output
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "csv" => write_csv(&args.output, &rows)?,
        "parquet" | "pq" => write_parquet(&args.output, &rows)?,
        other => bail!("Unsupported output extension: .{other}"),
    }

    info!("wrote {} registrations to {}", rows.len(), args.output.display());
    Ok(())
}
