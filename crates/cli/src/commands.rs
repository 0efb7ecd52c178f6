use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// List one page of an endpoint
    List {
        /// Endpoint path, e.g. "observations" or "observations/aggregate"
        endpoint: String,

        #[arg(
            long,
            help = "Query string, e.g. \"counter=1,2&page_size=100\"; a full URL also works"
        )]
        query: Option<String>,

        #[arg(
            long,
            help = "If specified, writes the JSON response to this file instead of stdout"
        )]
        output: Option<String>,
    },
    /// Fetch one row by its lookup field
    Retrieve {
        endpoint: String,

        /// Lookup value, e.g. a counter id
        key: String,

        #[arg(long, help = "Query string with filters applied to the lookup")]
        query: Option<String>,
    },
    /// Print the SQL a list request would run, without connecting
    Explain {
        endpoint: String,

        #[arg(
            long,
            help = "Query string; without it the endpoint's base query is shown"
        )]
        query: Option<String>,
    },
    /// Decode a pagination cursor token
    DecodeCursor {
        token: String,

        #[arg(long, help = "Check the token against this endpoint's ordering")]
        endpoint: Option<String>,

        #[arg(long, help = "Ordering request used with --endpoint, e.g. \"counter\"")]
        order: Option<String>,
    },
    /// Test the database connection
    TestConn {
        /// Connection string; defaults to DATABASE_URL
        #[arg(long)]
        conn_str: Option<String>,
    },
}
