use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Run a bulk job described by a job file
    Run {
        #[arg(long, help = "Job file path")]
        job: String,

        #[arg(long, help = "Base URL of the search backend")]
        url: String,

        #[arg(long, default_value = "cli", help = "Principal the job runs as")]
        principal: String,

        #[arg(
            long,
            value_delimiter = ',',
            help = "Roles held by the principal, comma separated (admin, publisher)"
        )]
        roles: Vec<String>,

        #[arg(
            long,
            help = "If set, prints the job receipt as JSON instead of a table"
        )]
        json: bool,
    },

    /// Test connectivity against the search backend
    Ping {
        #[arg(long, help = "Base URL of the search backend")]
        url: String,
    },

    /// Parse a job file and print it back as JSON
    Job {
        #[arg(long, help = "Job file path")]
        file: String,
    },
}
