use anyhow::Result;
use clap::Parser;
use shorthand::*;

#[derive(Parser)]
#[command(name = "shorthand")]
#[command(about = "Expand chemical shorthand labels into fragment trees", long_about = None)]
struct Args {
    /// Labels to expand, e.g. CO2Et or (CH3)2N
    #[arg(value_name = "TOKEN", required = true)]
    tokens: Vec<String>,

    /// Print Graphviz source instead of coordinates
    #[arg(long)]
    dot: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "SHORTHAND_LOG", default_value = "warn")]
    log: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log);

    for token in &args.tokens {
        match interpret(token) {
            Ok(Resolution::Resolved(fragment)) => {
                println!("{}: {}", token, fragment);
                if args.dot {
                    print!("{}", fragment.to_dot());
                    continue;
                }
                for (_, id) in fragment.walk() {
                    let node = fragment.node(id);
                    let element = node.symbol.element().map_or("-", |element| element.symbol());
                    println!(
                        "    {:>2} {:<3} {:<2} ({:>7.3}, {:>7.3})",
                        id.index(),
                        node.label(),
                        element,
                        node.suggested_position.x,
                        node.suggested_position.y
                    );
                }
            }
            Ok(Resolution::NoMatch) => println!("{}: no match", token),
            // One bad token does not stop the rest.
            Err(err) => eprintln!("{}: {}", token, err),
        }
    }
    Ok(())
}
