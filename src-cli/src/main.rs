fn main() -> anyhow::Result<()> {
    spiralscan_cli::run()
}
