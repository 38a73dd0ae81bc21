use std::rc::Rc;
use trapsim::base::{Coefficient, Material, Materials, ParamMesh, ParamTrap, TrapDensity};
use trapsim::fem::{shared, Function, FunctionSpace, Trap, TrapCollection, VolumeMeasure};
use trapsim::StrError;

fn trap(materials: &[&str]) -> Result<Trap, StrError> {
    Trap::new(ParamTrap::new(1.0, 0.2, 1e13, 1.0, materials, 1e-3))
}

#[test]
fn test_ids_follow_insertion_order() -> Result<(), StrError> {
    let traps = TrapCollection::new(vec![
        trap(&["w"])?,
        Trap::new(ParamTrap::new(1.0, 0.2, 1e13, 1.0, &["w"], 1e-3).with_id(5))?,
        trap(&["w"])?,
    ]);
    assert_eq!(traps.ids(), &[1, 5, 2]);
    let labels: Vec<_> = traps.iter().map(|t| t.label()).collect();
    assert_eq!(labels, &["1", "5", "2"]);
    assert_eq!(traps.get_trap(2)?.component, 3);
    Ok(())
}

#[test]
fn test_forms_over_several_materials() -> Result<(), StrError> {
    //   0-----1-----2-----3-----4
    //     (1)   (1)   (2)   (2)
    let mut p = ParamMesh::uniform(4, 1.0);
    p.volume(1, 0.0, 0.5).volume(2, 0.5, 1.0);
    let space = Rc::new(FunctionSpace::new(p.generate()?)?);
    let dx = VolumeMeasure::new(&space);
    let materials = Materials::new(vec![Material::new(1, "w", 1.0, 0.0), Material::new(2, "cu", 1.0, 0.0)])?;
    let temperature = shared(Function::constant("T", 5, 400.0));

    let density = TrapDensity::Intrinsic(Coefficient::Function(|x, _| 1.0 + x[0]));
    let mut param = ParamTrap::new(1.0, 0.0, 1.0, 0.0, &["w", "cu"], 0.0);
    param.density = density;
    let mut traps = TrapCollection::new(vec![Trap::new(param)?, trap(&["cu"])?]);

    // steady state: one trapping term per material and trap
    traps.build_forms(0, &materials, &temperature, &dx, None)?;
    assert_eq!(traps[0].volumes, &[1, 2]);
    assert_eq!(traps[1].volumes, &[2]);
    assert_eq!(traps.form.as_ref().map(|f| f.terms.len()), Some(3));
    assert_eq!(traps.sub_expressions.len(), 1);

    let mut traps = TrapCollection::new(vec![trap(&["steel"])?]);
    assert_eq!(
        traps.build_forms(0, &materials, &temperature, &dx, None).err(),
        Some("cannot find material cited by trap")
    );
    assert_eq!(Trap::new(ParamTrap::new(1.0, 0.0, 1.0, 0.0, &[], 1.0)).err(), Some("a trap must cite at least one material"));
    Ok(())
}
