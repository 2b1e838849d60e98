use std::panic::{self, AssertUnwindSafe};
use std::process;

use clap::{Args, Parser as ClapParser, Subcommand};
use virgule::cli::{self, CliError, Settings};

#[derive(ClapParser)]
#[command(name = "virgule")]
#[command(about = "virgule helps you explore data stored in delimited files")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InputArgs {
    /// Input file ('-' reads stdin)
    #[arg(short, long, default_value = "-")]
    file: String,

    /// Field separator; must be punctuation, space or tab
    #[arg(short, long, default_value = ",", value_parser = parse_separator)]
    separator: char,

    /// Print rows as a padded table instead of CSV
    #[arg(short, long)]
    table: bool,

    /// Column width in table layout
    #[arg(short, long, default_value_t = 10)]
    width: usize,

    /// Prefix every emitted row with this tag
    #[arg(long)]
    tag: Option<String>,
}

impl InputArgs {
    fn settings(&self) -> Settings {
        Settings {
            file: self.file.clone(),
            separator: self.separator,
            table: self.table,
            width: self.width,
            tag: self.tag.clone(),
        }
    }
}

fn parse_separator(value: &str) -> Result<char, String> {
    if value == "\\t" {
        return Ok('\t');
    }
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(format!("separator must be a single character, got '{}'", value)),
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Project columns from each row
    Select {
        #[command(flatten)]
        input: InputArgs,

        /// Column selection, e.g. "1,3:5,7:"
        selection: String,
    },

    /// Keep rows matching an expression
    Filter {
        #[command(flatten)]
        input: InputArgs,

        /// Filter expression, e.g. "$1 > 2 && $3 == \"west\""
        #[arg(allow_hyphen_values = true)]
        expression: String,
    },

    /// Rewrite columns in place
    #[command(alias = "fmt")]
    Format {
        #[command(flatten)]
        input: InputArgs,

        /// Formatter specs: "index:kind:pattern"
        #[arg(required = true)]
        specs: Vec<String>,
    },

    /// Aggregate rows by composite key
    Group {
        #[command(flatten)]
        input: InputArgs,

        /// Traverse groups in descending key order
        #[arg(short, long)]
        reverse: bool,

        /// Key selection
        key: String,

        /// Aggregations: <op> <selection> pairs (min/max/sum/count/mean)
        operations: Vec<String>,
    },

    /// Count rows per composite key, with cumulative count and percentage
    #[command(alias = "freq")]
    Frequency {
        #[command(flatten)]
        input: InputArgs,

        /// Traverse keys in descending order
        #[arg(short, long)]
        reverse: bool,

        /// Key selection
        key: String,
    },

    /// Swap rows and columns
    Transpose {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Concatenate files by rows (--append) or by columns
    Cat {
        #[command(flatten)]
        input: InputArgs,

        /// Concatenate rows instead of zipping columns
        #[arg(short, long)]
        append: bool,

        /// Input files
        files: Vec<String>,
    },

    /// Write matching rows into one file per composite key
    Split {
        #[command(flatten)]
        input: InputArgs,

        /// Directory for the output files (created if missing)
        #[arg(short, long, default_value = ".")]
        datadir: String,

        /// Prefix for output file names
        #[arg(short, long, default_value = "")]
        prefix: String,

        /// Append to existing files instead of truncating them
        #[arg(short, long)]
        append: bool,

        /// Key selection choosing the target file
        key: String,

        /// Filter expression; empty matches every row
        #[arg(allow_hyphen_values = true, default_value = "")]
        expression: String,
    },

    /// Compute derived columns with assignment expressions
    Eval {
        #[command(flatten)]
        input: InputArgs,

        /// Assignment expressions, e.g. "=$1*10" or "2=$1+$3"
        #[arg(required = true, allow_hyphen_values = true)]
        expressions: Vec<String>,
    },

    /// Pretty-print rows with optional headers
    #[command(alias = "table")]
    Show {
        #[command(flatten)]
        input: InputArgs,

        /// Print at most this many rows
        #[arg(short, long)]
        limit: Option<usize>,

        /// Header names
        headers: Vec<String>,
    },

    /// Stable sort of all rows by key selection
    Sort {
        #[command(flatten)]
        input: InputArgs,

        /// Key selection
        selection: String,
    },

    /// Guess the type of each field of the first row
    Describe {
        #[command(flatten)]
        input: InputArgs,
    },
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Select { input, selection } => cli::stream::select(&input.settings(), &selection),
        Commands::Filter { input, expression } => {
            cli::stream::filter(&input.settings(), &expression)
        }
        Commands::Format { input, specs } => cli::stream::format(&input.settings(), &specs),
        Commands::Group {
            input,
            reverse,
            key,
            operations,
        } => cli::summary::group(&input.settings(), &key, &operations, reverse),
        Commands::Frequency {
            input,
            reverse,
            key,
        } => cli::summary::frequency(&input.settings(), &key, reverse),
        Commands::Transpose { input } => cli::reshape::transpose(&input.settings()),
        Commands::Cat {
            input,
            append,
            files,
        } => cli::reshape::cat(&input.settings(), &files, append),
        Commands::Split {
            input,
            datadir,
            prefix,
            append,
            key,
            expression,
        } => cli::reshape::split(&input.settings(), &key, &expression, &datadir, &prefix, append),
        Commands::Eval { input, expressions } => cli::stream::eval(&input.settings(), &expressions),
        Commands::Show {
            input,
            limit,
            headers,
        } => cli::stream::show(&input.settings(), &headers, limit),
        Commands::Sort { input, selection } => cli::reshape::sort(&input.settings(), &selection),
        Commands::Describe { input } => cli::summary::describe(&input.settings()),
    }
}

fn main() {
    let cli = Cli::parse();
    match panic::catch_unwind(AssertUnwindSafe(|| run(cli))) {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            eprintln!("{}", err);
            process::exit(2);
        }
        Err(_) => {
            eprintln!("unexpected error");
            process::exit(2);
        }
    }
}
