use std::sync::Once;

static INIT: Once = Once::new();

/// Install a `fmt` subscriber that writes through the test harness, once per
/// test binary.
///
/// `RUST_LOG` is honoured when set, e.g. `RUST_LOG=jane_runtime=trace` to
/// watch event delivery; otherwise only `info` and above is shown.
pub fn init_tracing_for_tests() {
    INIT.call_once(|| {
        use tracing_subscriber::filter::EnvFilter;
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        // Another harness may already own the global subscriber.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_test_writer()
            .try_init();
    });
}

#[cfg(feature = "fixtures")]
pub mod fixtures {
    //! Small datasets shared by the table, runtime and end-to-end suites.

    use jane_table::{Bag, MetaData};
    use jane_types::constants::PRIMARY_KEY_TAG;
    use jane_types::{Record, Value};

    /// `(id, age)` rows of the worked filter-and-sort example: filtering
    /// `age >= 25` keeps ids 1 and 3, sorting those by `age asc` gives 3, 1.
    pub const AGES: [(i64, i64); 3] = [(1, 30), (2, 20), (3, 25)];

    /// Text values whose lexical and numeric orders disagree.
    pub const MIXED_TEXT: [&str; 10] = ["9", "10", "1a", "2", "20", "2b", "100", "1", "b", "A10"];

    /// Read-only bag over [`AGES`] with `id` as primary key.
    pub fn ages_bag(name: &str) -> Bag {
        let metadata = MetaData::new()
            .with_column("id", "number", [PRIMARY_KEY_TAG])
            .and_then(|m| m.with_column("age", "number", [] as [&str; 0]))
            .expect("ages metadata");
        let records = AGES
            .iter()
            .map(|(id, age)| Record::from_iter([("id", Value::from(*id)), ("age", Value::from(*age))]))
            .collect();
        Bag::new(name, metadata, records, false)
    }

    /// Read-only bag with a text column `s` cycling through [`MIXED_TEXT`]
    /// with stride `stride`, one row per `id` in `0..rows`.
    pub fn mixed_text_bag(rows: usize, stride: usize) -> Bag {
        let metadata = MetaData::new()
            .with_column("id", "integer", [PRIMARY_KEY_TAG])
            .and_then(|m| m.with_column("s", "string", [] as [&str; 0]))
            .expect("text metadata");
        let records = (0..rows)
            .map(|id| {
                let s = MIXED_TEXT[(id * stride) % MIXED_TEXT.len()];
                Record::from_iter([("id", Value::from(id as i64)), ("s", Value::from(s))])
            })
            .collect();
        Bag::new("mixed", metadata, records, false)
    }
}

#[cfg(feature = "auto-init")]
mod auto {
    // Runs at binary load so tests need not call the initializer themselves.
    use ctor::ctor;

    #[ctor]
    fn init() {
        super::init_tracing_for_tests();
    }
}
