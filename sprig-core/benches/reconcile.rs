use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sprig_core::{Element, Hooks, MemoryHost, Props, Runtime};

fn row(hooks: &mut Hooks, props: &Props) -> Element {
    let (selected, _) = hooks.use_state(|| false);
    Element::host("li")
        .prop("selected", selected)
        .child(props.get_str("label").unwrap_or_default().to_string())
}

fn list(len: usize, generation: i64) -> Element {
    Element::host("ul").children((0..len).map(|index| {
        Element::component("Row", row).prop("label", format!("row {index} / {generation}"))
    }))
}

fn mount_list(c: &mut Criterion) {
    c.bench_function("mount_list_1000", |b| {
        b.iter(|| {
            let mut host = MemoryHost::new();
            let mount = host.create_root("root");
            let mut runtime = Runtime::new(host);
            runtime.render(list(1000, 0), mount);
            black_box(runtime.flush().expect("mount"));
        });
    });
}

fn rerender_list(c: &mut Criterion) {
    let mut host = MemoryHost::new();
    let mount = host.create_root("root");
    let mut runtime = Runtime::new(host);
    runtime.render(list(1000, 0), mount);
    runtime.flush().expect("initial render");

    let mut generation = 0;
    c.bench_function("rerender_list_1000", |b| {
        b.iter(|| {
            generation += 1;
            runtime.render(list(1000, generation), mount);
            black_box(runtime.flush().expect("render"));
            runtime.host_mut().clear_ops();
        });
    });
}

criterion_group!(benches, mount_list, rerender_list);
criterion_main!(benches);
