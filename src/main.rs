fn main() -> anyhow::Result<()> {
    carousel::run()
}
