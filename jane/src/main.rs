use std::io::{self, IsTerminal, Read, Write};
use std::rc::Rc;
use std::sync::Arc;

use jane::{
    AssembleMapping, Bag, ColumnList, CompareOp, DataEvent, Error as JaneError, EventSource,
    FilterExpr, FnSubscriber, MetaData, PRIMARY_KEY_TAG, QueryConfig, Record, Reference,
    ReferenceLink, ReferenceOptions, Registry, StaticSource, TransformStep, Value,
};
use tracing_subscriber::EnvFilter;

#[allow(clippy::print_stdout)]
fn print_banner() {
    const NAME: &str = env!("CARGO_PKG_NAME");
    const VER: &str = env!("CARGO_PKG_VERSION");
    println!("{} version {}", NAME, VER);
    println!("Enter \".help\" for usage hints.");
    println!("A sample reference named \"people\" is registered.");
}

#[allow(clippy::print_stdout)]
fn print_help() {
    println!(".help                     Show this message");
    println!(".refs                     List registered references");
    println!(".show NAME                Populate NAME and print its rows");
    println!(".link NAME UPSTREAM [| where COL OP VALUE] [| sort LIST] [| select LIST]");
    println!("                          Register a reference derived from UPSTREAM");
    println!(".flush NAME               Drop the rows held by NAME");
    println!(".refresh NAME             Re-acquire the rows of NAME");
    println!(".remove NAME              Unregister NAME and everything derived from it");
    println!(".exit/.quit               Exit the REPL");
    println!();
    println!("OP is one of < <= = >= > or \"in\" followed by comma-separated values.");
}

/// Sample rows shaped like a remote result set: the payload sits under
/// `data` and the coordinates are assembled into a `location` record.
fn sample_people() -> Result<Arc<Bag>, JaneError> {
    let metadata = MetaData::new()
        .with_column("id", "integer", [PRIMARY_KEY_TAG])?
        .with_column("name", "string", [] as [&str; 0])?
        .with_column("age", "number", [] as [&str; 0])?
        .with_column("joined", "datetime", [] as [&str; 0])?
        .with_column("lon", "number", ["geo"])?
        .with_column("lat", "number", ["geo"])?
        .with_column("location", "GeoPoint", [] as [&str; 0])?;

    let rows = [
        (1, "Ada", 36, "2021-03-04 10:00:00", 10.75, 59.91),
        (2, "Brian", 24, "2022-11-30", 5.32, 60.39),
        (3, "Chiara", 29, "2020-01-15T08:30:00Z", 18.95, 69.65),
        (4, "dmitri", 41, "2023-06-01", 10.39, 63.43),
        (5, "Eun-ji", 24, "2019-09-09", 11.97, 57.70),
    ];
    let records = rows
        .into_iter()
        .map(|(id, name, age, joined, lon, lat)| {
            let data = Record::from_iter([
                ("id", Value::from(id)),
                ("name", Value::from(name)),
                ("age", Value::from(age)),
                ("joined", Value::from(joined)),
                ("lon", Value::from(lon)),
                ("lat", Value::from(lat)),
            ]);
            Record::from_iter([("data", Value::from(data))])
        })
        .collect::<Vec<Record>>();

    let raw = Bag::new("sample", metadata, records, false);
    let unwrap = TransformStep::compound(vec![
        TransformStep::extract("data"),
        TransformStep::assemble(
            "location",
            vec![
                AssembleMapping::new("longitude", "lon"),
                AssembleMapping::new("latitude", "lat"),
            ],
        ),
    ]);
    let shaped = raw.query(&QueryConfig::new().with_transform(unwrap), false)?;
    Ok(Arc::new(shaped))
}

fn parse_value(text: &str) -> Value {
    let text = text.trim();
    if let Some(quoted) = text
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .or_else(|| text.strip_prefix('\'').and_then(|t| t.strip_suffix('\'')))
    {
        return Value::from(quoted);
    }
    if text.eq_ignore_ascii_case("null") {
        return Value::Null;
    }
    if let Ok(b) = text.parse::<bool>() {
        return Value::from(b);
    }
    if let Ok(i) = text.parse::<i64>() {
        return Value::from(i);
    }
    if let Ok(f) = text.parse::<f64>() {
        return Value::from(f);
    }
    Value::from(text)
}

/// `COL OP VALUE` or `COL in V1,V2,...`.
fn parse_where(clause: &str) -> Result<FilterExpr, JaneError> {
    let mut parts = clause.trim().splitn(3, char::is_whitespace);
    let (Some(column), Some(op), Some(value)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(JaneError::InvalidArgumentError(format!(
            "expected COL OP VALUE, got '{}'",
            clause.trim()
        )));
    };
    if op.eq_ignore_ascii_case("in") {
        return Ok(FilterExpr::is_in(column, value.split(',').map(parse_value)));
    }
    let op: CompareOp = op.parse()?;
    Ok(FilterExpr::compare(column, op, parse_value(value)))
}

fn parse_link(args: &str) -> Result<(String, String, QueryConfig), JaneError> {
    let mut segments = args.split('|');
    let head = segments.next().unwrap_or_default();
    let mut names = head.split_whitespace();
    let (Some(name), Some(upstream)) = (names.next(), names.next()) else {
        return Err(JaneError::InvalidArgumentError(
            ".link requires NAME and UPSTREAM".into(),
        ));
    };

    let mut config = QueryConfig::new();
    for segment in segments {
        let segment = segment.trim();
        let (keyword, rest) = segment.split_once(char::is_whitespace).unwrap_or((segment, ""));
        config = match keyword.to_ascii_lowercase().as_str() {
            "where" => config.with_where(parse_where(rest)?),
            "sort" => config.with_sort(ColumnList::from(rest)),
            "select" => config.with_select(ColumnList::from(rest)),
            other => {
                return Err(JaneError::InvalidArgumentError(format!(
                    "unknown clause '{}'",
                    other
                )));
            }
        };
    }
    Ok((name.to_string(), upstream.to_string(), config))
}

fn format_bag(bag: &Bag) -> String {
    let columns: Vec<&str> = bag.metadata().columns().map(|c| c.name.as_str()).collect();
    let mut out = columns.join(" | ");
    out.push('\n');
    for record in bag.records() {
        let cells: Vec<String> = columns
            .iter()
            .map(|c| record.value_or_null(c).to_string())
            .collect();
        out.push_str(&cells.join(" | "));
        out.push('\n');
    }
    out.push_str(&format!("({} rows)", bag.len()));
    out
}

struct Session {
    registry: Rc<Registry>,
}

impl Session {
    fn with_sample_data() -> Result<Self, JaneError> {
        let registry = Registry::new();
        registry.add_subscriber(FnSubscriber::new(
            "shell",
            |source: &dyn EventSource, event: &DataEvent| {
                tracing::info!("{}: {}", source.source_name(), event);
            },
        ));
        let people = Reference::new("people", StaticSource::new(sample_people()?));
        registry.add_data_reference(&people);
        Ok(Self { registry })
    }

    fn reference(&self, name: &str) -> Result<Rc<Reference>, JaneError> {
        self.registry
            .get_data_reference(name)
            .ok_or_else(|| JaneError::InvalidArgumentError(format!("no reference named '{}'", name)))
    }

    #[allow(clippy::print_stdout)]
    fn execute(&self, line: &str) -> Result<bool, JaneError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(true);
        }
        let (command, args) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let args = args.trim();
        match command {
            ".help" => print_help(),
            ".exit" | ".quit" => return Ok(false),
            ".refs" => {
                for name in self.registry.names() {
                    let status = self.reference(&name).map(|r| r.status())?;
                    println!("{} ({:?})", name, status);
                }
            }
            ".show" => {
                let reference = self.reference(args)?;
                reference.populate()?;
                match reference.bag() {
                    Some(bag) => println!("{}", format_bag(&bag)),
                    None => println!("{} is still populating", reference.name()),
                }
            }
            ".link" => {
                let (name, upstream, config) = parse_link(args)?;
                let upstream = self.reference(&upstream)?;
                let link =
                    ReferenceLink::create(name, &upstream, config, ReferenceOptions::default());
                if self.registry.add_data_reference(&link).is_none() {
                    link.detach();
                    println!("{} is already registered", link.name());
                }
            }
            ".flush" => self.reference(args)?.flush(),
            ".refresh" => self.reference(args)?.refresh()?,
            ".remove" => {
                let reference = self.reference(args)?;
                self.registry.remove_data_reference(&reference);
            }
            other => println!("Unknown command: {}", other),
        }
        Ok(true)
    }
}

#[allow(clippy::print_stdout, clippy::print_stderr)]
fn repl(session: &Session) -> io::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut line = String::new();

    loop {
        line.clear();
        print!("jane> ");
        stdout.flush()?;
        if stdin.read_line(&mut line)? == 0 {
            println!();
            break;
        }
        match session.execute(&line) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => eprintln!("Command failed: {}", e),
        }
    }
    Ok(())
}

#[allow(clippy::print_stderr)]
fn process_stream<R: Read>(session: &Session, reader: R) -> io::Result<()> {
    let mut buf = String::new();
    io::BufReader::new(reader).read_to_string(&mut buf)?;
    for line in buf.lines() {
        match session.execute(line) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => eprintln!("Command failed: {}", e),
        }
    }
    Ok(())
}

#[allow(clippy::print_stderr)]
fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--help" | "-h" => {
                print_banner();
                print_help();
                return;
            }
            other => {
                eprintln!("Unrecognized argument: {}", other);
                print_help();
                std::process::exit(1);
            }
        }
    }

    let session = match Session::with_sample_data() {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Failed to load sample data: {}", e);
            std::process::exit(1);
        }
    };

    if !io::stdin().is_terminal() {
        if let Err(e) = process_stream(&session, io::stdin()) {
            eprintln!("Error processing stdin: {}", e);
            std::process::exit(1);
        }
        return;
    }

    print_banner();
    if let Err(e) = repl(&session) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_are_typed() {
        assert_eq!(parse_value("25"), Value::Integer(25));
        assert_eq!(parse_value("2.5"), Value::Float(2.5));
        assert_eq!(parse_value("'25'"), Value::from("25"));
        assert_eq!(parse_value("NULL"), Value::Null);
        assert_eq!(parse_value("true"), Value::Bool(true));
    }

    #[test]
    fn link_clauses_parse() {
        let (name, upstream, config) =
            parse_link("adults people | where age >= 25 | sort age desc | select name").unwrap();
        assert_eq!((name.as_str(), upstream.as_str()), ("adults", "people"));
        assert_eq!(config.sort, Some(ColumnList::from("age desc")));
        assert_eq!(config.select, Some(ColumnList::from("name")));
        assert!(config.filter.is_some());

        assert!(parse_link("lonely").is_err());
        assert!(parse_link("a b | group x").is_err());
        assert!(parse_where("age ~ 3").is_err());
    }

    #[test]
    fn sample_data_is_unwrapped_and_assembled() {
        let bag = sample_people().unwrap();
        assert_eq!(bag.len(), 5);
        let first = &bag.records()[0];
        assert_eq!(first.get("name"), Some(&Value::from("Ada")));
        let location = first
            .get("location")
            .and_then(Value::as_record)
            .expect("assembled");
        assert_eq!(location.get("latitude"), Some(&Value::from(59.91)));
    }

    #[test]
    fn session_links_and_removes() {
        let session = Session::with_sample_data().unwrap();
        assert!(session
            .execute(".link young people | where age < 30 | sort joined desc")
            .unwrap());
        let young = session.reference("young").unwrap();
        young.populate().unwrap();
        let ids: Vec<Value> = young
            .bag()
            .unwrap()
            .records()
            .iter()
            .map(|r| r.value_or_null("id").clone())
            .collect();
        assert_eq!(ids, vec![Value::from(2), Value::from(3), Value::from(5)]);

        session.execute(".remove people").unwrap();
        assert!(session.reference("young").is_err());
        assert!(!session.execute(".quit").unwrap());
    }
}
