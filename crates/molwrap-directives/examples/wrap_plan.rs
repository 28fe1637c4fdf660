// Example that prints the wrapping decisions for a small API surface
use molwrap_directives::{DirectiveSet, SkipMatch};
use molwrap_surface::ApiSurface;

const SURFACE: &str = r#"{
    "version": "9.1",
    "classes": [
        {
            "name": "Vec3",
            "methods": [
                {
                    "name": "Vec3",
                    "parameters": [
                        {"name": "x", "type_name": "double"},
                        {"name": "y", "type_name": "double"},
                        {"name": "z", "type_name": "double"}
                    ]
                }
            ]
        },
        {
            "name": "System",
            "methods": [
                {
                    "name": "addForce",
                    "return_type": "int",
                    "parameters": [{"name": "force", "type_name": "Force *"}]
                },
                {
                    "name": "addParticle",
                    "return_type": "int",
                    "parameters": [{"name": "mass", "type_name": "double"}]
                }
            ]
        },
        {
            "name": "State",
            "methods": [
                {"name": "getTime", "return_type": "double"},
                {
                    "name": "getPeriodicBoxVectors",
                    "parameters": [
                        {"name": "a", "type_name": "Vec3", "is_reference": true},
                        {"name": "b", "type_name": "Vec3", "is_reference": true},
                        {"name": "c", "type_name": "Vec3", "is_reference": true}
                    ]
                }
            ]
        },
        {
            "name": "AndersenThermostat",
            "methods": [{"name": "getTemperature", "return_type": "double"}]
        }
    ]
}"#;

fn main() {
    let set = DirectiveSet::builtin().expect("built-in table must load");
    let surface = ApiSurface::from_json_str(SURFACE).expect("surface must parse");

    println!(
        "directive table v{}: {} skip rules, {} unit annotations",
        set.version(),
        set.skip_rule_count(),
        set.unit_rule_count()
    );
    println!();

    for class in &surface.classes {
        let class_name = class.name.as_str();
        println!("class {class_name}");

        for method in &class.methods {
            let method_name = method.name.as_str();
            match set.skip_match(class_name, method_name, method.arity()) {
                Some(SkipMatch::Class) => {
                    println!("  {method_name}/{}: skip (whole class)", method.arity());
                    continue;
                }
                Some(SkipMatch::Method) => {
                    println!("  {method_name}/{}: skip (all overloads)", method.arity());
                    continue;
                }
                Some(SkipMatch::Overload) => {
                    println!("  {method_name}/{}: skip (this overload)", method.arity());
                    continue;
                }
                None => {}
            }

            let outputs: Vec<&str> = method
                .parameters
                .iter()
                .filter(|p| {
                    set.is_output_argument(
                        class_name,
                        method_name,
                        &p.name,
                        p.is_non_const_reference(),
                    )
                })
                .map(|p| p.name.as_str())
                .collect();

            print!("  {method_name}/{}: wrap", method.arity());
            if !outputs.is_empty() {
                print!(", outputs {outputs:?}");
            }
            let owned = set.ownership_transfer_positions(class_name, method_name);
            if !owned.is_empty() {
                print!(", native owns args {owned:?}");
            }
            if let Some(spec) = set.units_for(class_name, method_name) {
                if let Some(unit) = spec.returns.as_ref() {
                    print!(", returns {}", unit.as_str());
                }
            }
            println!();
        }
        println!();
    }
}
