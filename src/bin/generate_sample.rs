use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Date32Array, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, Days, NaiveDate};
use parquet::arrow::ArrowWriter;

const METRIC_COLUMNS: [&str; 9] = [
    "haha", "like", "wow", "angry", "sad", "love", "hug", "shares", "comments_num",
];

const TOPICS: [(&str, &str); 6] = [
    ("Grüne Energie im Aufwind", "Windkraft und Solarenergie liefern einen Rekordanteil am Strommix."),
    ("Klimagipfel ohne Einigung", "Die Delegierten vertagen die Entscheidung über neue Klimaziele."),
    ("Energiepreise steigen weiter", "Haushalte zahlen mehr für Gas und Strom, die Energiewende stockt."),
    ("Bundesliga: Spitzenspiel endet remis", "Beide Mannschaften trennen sich nach neunzig Minuten unentschieden."),
    ("Neue Regierung vereidigt", "Der Kanzler stellt das Kabinett vor und kündigt Reformen an."),
    ("Hitzewelle und Klimawandel", "Meteorologen sehen einen Zusammenhang zwischen Klima und Extremwetter."),
];

/// Small deterministic generator (splitmix64), enough for sample data.
struct SplitMix(u64);

impl SplitMix {
    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }
}

struct Columns {
    dates: Vec<i32>,
    texts: Vec<Option<String>>,
    fulltexts: Vec<Option<String>>,
    metrics: Vec<Vec<Option<f64>>>,
}

fn generate(n_days: u64, start: NaiveDate, rng: &mut SplitMix) -> Result<Columns> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).context("epoch")?;
    let mut cols = Columns {
        dates: Vec::new(),
        texts: Vec::new(),
        fulltexts: Vec::new(),
        metrics: vec![Vec::new(); METRIC_COLUMNS.len()],
    };

    for offset in 0..n_days {
        let date = start
            .checked_add_days(Days::new(offset))
            .context("date out of range")?;
        let per_day = 3 + rng.below(6);

        for _ in 0..per_day {
            let (title, body) = TOPICS[rng.below(TOPICS.len())];
            cols.dates.push((date - epoch).num_days() as i32);
            // Some teasers and bodies are missing, as in scraped data.
            cols.texts.push((rng.next_f64() > 0.05).then(|| title.to_string()));
            cols.fulltexts.push((rng.next_f64() > 0.1).then(|| body.to_string()));

            let popularity = 1.0 + rng.next_f64() * 4.0;
            for (i, metric) in cols.metrics.iter_mut().enumerate() {
                let value = (rng.next_f64() * 50.0 * popularity * (i + 1) as f64).floor();
                metric.push((rng.next_f64() > 0.03).then_some(value));
            }
        }
    }
    Ok(cols)
}

fn main() -> Result<()> {
    let mut rng = SplitMix(42);
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).context("start date")?;
    let cols = generate(60, start, &mut rng)?;
    let n_rows = cols.dates.len();

    let mut fields = vec![
        Field::new("date", DataType::Date32, false),
        Field::new("text", DataType::Utf8, true),
        Field::new("fulltext", DataType::Utf8, true),
    ];
    let mut arrays: Vec<ArrayRef> = vec![
        Arc::new(Date32Array::from(cols.dates.clone())),
        Arc::new(StringArray::from(cols.texts.clone())),
        Arc::new(StringArray::from(cols.fulltexts.clone())),
    ];
    for (name, values) in METRIC_COLUMNS.iter().zip(&cols.metrics) {
        fields.push(Field::new(*name, DataType::Float64, true));
        arrays.push(Arc::new(Float64Array::from(values.clone())));
    }

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), arrays).context("building record batch")?;

    // Write Parquet
    let parquet_path = "sample_articles.parquet";
    let file = std::fs::File::create(parquet_path).context("creating parquet output")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;

    // Write CSV with the same content
    let csv_path = "sample_articles.csv";
    let mut csv_writer = csv::Writer::from_path(csv_path).context("creating CSV output")?;
    let mut header = vec!["date", "text", "fulltext"];
    header.extend(METRIC_COLUMNS);
    csv_writer.write_record(&header)?;

    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).context("epoch")?;
    for row in 0..n_rows {
        let date = epoch
            .checked_add_days(Days::new(cols.dates[row] as u64))
            .context("date out of range")?;
        let mut record = vec![
            format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day()),
            cols.texts[row].clone().unwrap_or_default(),
            cols.fulltexts[row].clone().unwrap_or_default(),
        ];
        record.extend(
            cols.metrics
                .iter()
                .map(|m| m[row].map(|v| v.to_string()).unwrap_or_default()),
        );
        csv_writer.write_record(&record)?;
    }
    csv_writer.flush()?;

    println!("Wrote {n_rows} articles over 60 days to {parquet_path} and {csv_path}");
    Ok(())
}
