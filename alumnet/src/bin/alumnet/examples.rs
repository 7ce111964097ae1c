use crate::commands::{communities, events, jobs, messages, ping, users};

#[derive(Clone, Copy)]
pub struct ExampleGroup {
    pub title: &'static str,
    pub commands: &'static [&'static str],
}

#[derive(Clone, Copy)]
pub struct CommandExample {
    pub name: &'static str,
    pub groups: &'static [ExampleGroup],
}

pub fn command_examples() -> &'static [CommandExample] {
    &[
        CommandExample {
            name: "ping",
            groups: ping::EXAMPLES,
        },
        CommandExample {
            name: "users",
            groups: users::EXAMPLES,
        },
        CommandExample {
            name: "events",
            groups: events::EXAMPLES,
        },
        CommandExample {
            name: "communities",
            groups: communities::EXAMPLES,
        },
        CommandExample {
            name: "messages",
            groups: messages::EXAMPLES,
        },
        CommandExample {
            name: "jobs",
            groups: jobs::EXAMPLES,
        },
    ]
}
