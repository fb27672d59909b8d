use std::hint::black_box;
use std::rc::Rc;

use criterion::{Criterion, criterion_group, criterion_main};
use flowcoord::{
    DependencyScope, Diagnostics, FlowController, FlowControllerExt, FlowCore, ModuleList, Result,
    module_fn,
};

struct Config {
    retries: u32,
}

struct Leaf {
    core: FlowCore<u32>,
}

impl FlowController for Leaf {
    type Output = u32;

    fn core(&self) -> &FlowCore<u32> {
        &self.core
    }

    fn start(self: Rc<Self>) -> Result<()> {
        Ok(())
    }
}

struct Scoped {
    core: FlowCore<()>,
}

impl FlowController for Scoped {
    type Output = ();

    fn core(&self) -> &FlowCore<()> {
        &self.core
    }

    fn modules(&self) -> Option<ModuleList> {
        Some(Vec::new())
    }

    fn start(self: Rc<Self>) -> Result<()> {
        Ok(())
    }
}

fn config_modules() -> ModuleList {
    vec![Box::new(module_fn("config", |registrations| {
        registrations.singleton(|_| Ok(Config { retries: 3 }));
    }))]
}

fn deep_resolution(c: &mut Criterion) {
    let root = DependencyScope::root("root", config_modules());
    let mut chain = vec![Rc::clone(&root)];
    for depth in 1..=16 {
        let parent = Rc::clone(&chain[chain.len() - 1]);
        chain.push(DependencyScope::child(&parent, format!("depth-{depth}"), Vec::new()));
    }
    let leaf = Rc::clone(&chain[chain.len() - 1]);

    c.bench_function("scope_resolve_depth_16", |b| {
        b.iter(|| {
            let config = leaf.resolve::<Config>().expect("resolve");
            black_box(config.retries);
        });
    });
}

fn nested_flow_resolution(c: &mut Criterion) {
    let root = Rc::new(Scoped {
        core: FlowCore::with_scope("root", DependencyScope::root("root", config_modules())),
    });
    let mut parent = Rc::clone(&root);
    for index in 0..8 {
        let child = Rc::new(Scoped {
            core: FlowCore::new(format!("scoped-{index}")),
        });
        parent.start_child(Rc::clone(&child)).expect("start");
        parent = child;
    }

    c.bench_function("flow_resolve_depth_8", |b| {
        b.iter(|| black_box(parent.resolve::<Config>().expect("resolve").retries));
    });
}

fn child_churn(c: &mut Criterion) {
    let root = Rc::new(Scoped {
        core: FlowCore::with_scope("root", DependencyScope::root("root", Vec::new())),
    });
    root.core().set_diagnostics(Diagnostics::new().with_metrics());

    c.bench_function("start_complete_64_children", |b| {
        b.iter(|| {
            for value in 0..64 {
                let leaf = Rc::new(Leaf {
                    core: FlowCore::new("leaf"),
                });
                root.start_child(Rc::clone(&leaf)).expect("start");
                leaf.complete(black_box(value));
            }
            assert_eq!(root.core().child_count(), 0);
        });
    });

    c.bench_function("start_release_64_children", |b| {
        b.iter(|| {
            for _ in 0..64 {
                let leaf = Rc::new(Leaf {
                    core: FlowCore::new("leaf"),
                });
                root.start_child(leaf).expect("start");
            }
            black_box(root.release_all_children());
        });
    });
}

criterion_group!(flows, deep_resolution, nested_flow_resolution, child_churn);
criterion_main!(flows);
