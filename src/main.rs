use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use esl_rag::{ChromaServer, Cli, Commands, Container, ContainerConfig, Router};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // The Chroma server owns the persist directory, so it runs without a container.
    if let Commands::Server {
        host,
        port,
        chroma_bin,
    } = &cli.command
    {
        let server = ChromaServer::new(
            chroma_bin.as_str(),
            &cli.persist_dir,
            host.as_str(),
            *port,
        );
        info!("Chroma server will listen on {}", server.url());
        println!("Connect with: esl-rag --chroma-url {} <command>", server.url());
        server.run().await?;
        return Ok(());
    }

    let config = ContainerConfig {
        require_persistent_vectors: cli.command.requires_persistent_vectors(),
        database: cli.database,
        persist_dir: cli.persist_dir,
        namespace: cli.namespace,
        chroma_url: cli.chroma_url,
        memory_storage: cli.memory_storage,
        mock_embeddings: cli.mock_embeddings,
        llm_provider: cli.llm_provider,
        api_key: cli.api_key,
        model: cli.model,
    };
    let container = Container::new(config).await?;
    let router = Router::new(&container);

    let output = router.route(cli.command).await?;
    println!("{}", output);

    Ok(())
}

#[cfg(test)]
mod cli_tests {
    use super::*;
    use esl_rag::{LlmProvider, TemplateKind};

    #[test]
    fn homework_requires_student_id() {
        let res = Cli::try_parse_from(["esl-rag", "homework"]);
        assert!(res.is_err(), "--student-id should be required");
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::try_parse_from([
            "esl-rag",
            "search",
            "business email",
            "--kind",
            "activity",
            "--mock-embeddings",
            "--llm-provider",
            "mock",
        ])
        .unwrap();

        assert!(cli.mock_embeddings);
        assert_eq!(cli.llm_provider, LlmProvider::Mock);
        match cli.command {
            Commands::Search { query, kind, num, .. } => {
                assert_eq!(query, "business email");
                assert_eq!(kind, TemplateKind::Activity);
                assert_eq!(num, 5);
            }
            _ => panic!("expected search command"),
        }
    }

    #[test]
    fn defaults_point_at_local_stores() {
        let cli = Cli::try_parse_from(["esl-rag", "stats"]).unwrap();

        assert_eq!(cli.database, std::path::PathBuf::from("./esl_app.duckdb"));
        assert_eq!(cli.persist_dir, std::path::PathBuf::from("./chroma_db"));
        assert_eq!(cli.namespace, "main");
        assert_eq!(cli.llm_provider, LlmProvider::Openai);
        assert!(cli.chroma_url.is_none());
        assert!(!cli.command.requires_persistent_vectors());
    }

    #[test]
    fn sync_and_init_need_a_persistent_vector_store() {
        for args in [["esl-rag", "sync"], ["esl-rag", "init"]] {
            let cli = Cli::try_parse_from(args).unwrap();
            assert!(cli.command.requires_persistent_vectors());
        }
    }
}
