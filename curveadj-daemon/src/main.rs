fn main() -> anyhow::Result<()> {
    curveadj_daemon::run()
}
