use parlance_realtime::utils::device;

fn main() -> anyhow::Result<()> {
    println!("input devices:");
    println!("{}", device::get_available_inputs()?);
    println!();
    println!("output devices:");
    println!("{}", device::get_available_outputs()?);
    Ok(())
}
