use anyhow::Result;

use cinescroll_core::Easing;

pub fn run(samples: Option<usize>) -> Result<()> {
    let names: Vec<&str> = Easing::names().collect();
    println!("Easings ({}):\n", names.len());

    for name in names {
        let easing = Easing::from_name(name)?;
        let default = if easing == Easing::default() {
            " (default)"
        } else {
            ""
        };

        match samples {
            Some(n) if n >= 2 => {
                let curve: Vec<String> = (0..n)
                    .map(|i| format!("{:.3}", easing.apply(i as f64 / (n - 1) as f64)))
                    .collect();
                println!("  {:<16}{} [{}]", name, default, curve.join(", "));
            }
            _ => println!("  {}{}", name, default),
        }
    }

    Ok(())
}
